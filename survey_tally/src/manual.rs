/*!

This is the long-form manual for `survey_tally` and `surveytally`.

## Input formats

The following formats are supported for the survey waves:
* `json` the payload returned by the survey data API
* `csv` Comma Separated Values, first line is the header
* `xlsx` Excel workbooks, first row of the worksheet is the header

### `json`

The payload of the spreadsheet API, as downloaded:

```json
{ "data": { "values": [["ID", "P1", "Peso 16 casas decimais"], ["1", "Sim", "1,02"]] } }
```

The first row holds the column names and all the cells are strings.

### `csv`

All the lines are read as text. Lines may have fewer cells than the header.

### `xlsx`

Numbers are written back as text the way a spreadsheet displays them:
integers without a decimal part. Error cells such as `#NULL!` keep their
spreadsheet notation, so that they are excluded like in the other formats.
When the workbook has several worksheets, `excelWorksheetName` selects one.

## How the statistics are computed

**Missing answers** The cells `""`, `#NULL!`, `#NULL`, `#null` and `-1` are
not answers. A respondent with such a cell does not count for this variable,
neither in the numerator nor in the denominator.

**Don't know** Any answer containing "não sabe" or "não respondeu"
(ignoring case) is reported as `NS/NR`.

**Weights** The weight column is found by name. A column whose name contains
`16 casas`, `decimais`, `deciamis` or `spss` (ignoring case) is preferred.
Otherwise a column named exactly `weight` or `weights` is used. Weights may
use a decimal comma. When no weight column exists, every weight is 0 and so
are all the percentages: unweighted respondents are never counted as 1.

**Multi-mention questions** A question whose options are spread over several
columns (one per mention) is configured with all its columns. The
percentages are relative to the number of respondents of the first column,
so they can add up to more than 100.

**Margin of error** The 95% margin of error reported next to every sample
is `1.96 * sqrt(0.25 / n) * 100` percentage points. It ignores the design
effect of the weights.

## Comparing waves

Column names may change between two rounds of the same survey. The
`columnNameMap` of the configuration maps a column of the current (last)
wave to its name in the previous wave. Filters and questions are always
written with the names of the current wave.

Filter values are matched exactly, or else ignoring case and surrounding
spaces, when comparing waves.

## Configuration file

```json
{
  "outputSettings": { "surveyName": "Pesquisa nacional", "outputFormat": "json" },
  "waves": [
    { "round": 1, "provider": "csv", "filePath": "round1.csv" },
    { "round": 2, "provider": "json", "filePath": "round2.json" }
  ],
  "columnNameMap": { "PF16": "PF17" },
  "demographics": [ { "label": "Região", "aliases": ["REGIAO", "Regiao"] } ],
  "questions": [
    { "id": "P1", "label": "Aprova o governo?", "variables": ["P1"] },
    { "id": "MIDIA", "variables": ["P5_1", "P5_2", "P5_3"] }
  ],
  "filters": { "REGIAO": ["Sul"] },
  "breakdownBy": "PF16"
}
```

File paths are relative to the directory of the configuration file.

*/
