/*!

This is the long-form manual for `campaign_core` and `polistudio`.

## Importing voters

`polistudio import FILE.csv` reads a voter file, proposes a mapping from its columns to
the voter fields, and uploads a cleaned copy to the server.

The file must have a `.csv` extension (any case). The first non-blank line is the header.
Blank lines are skipped, and `\r\n` line endings are accepted. Values may be quoted with
`"`, and a quote inside a quoted value is written twice:

```text
first_name,last_name,address,email
Ada,Lovelace,"12 Main St, Apt 4",ada@example.org
Grace,Hopper,"The ""Old"" Mill",
```

Rows shorter than the header are padded with empty values.

### Voter fields

| field            | notes                                            |
|------------------|--------------------------------------------------|
| `first_name`     | required                                         |
| `last_name`      | required                                         |
| `address`        |                                                  |
| `phone`          |                                                  |
| `email`          |                                                  |
| `support_level`  | 0 to 5                                           |
| `tags`           | separated by `;`                                 |
| `notes`          |                                                  |
| `registered`     | yes/no                                           |
| `last_contacted` | a date                                           |
| `lat`, `lng`     | WGS84 degrees, needed to place a voter in a turf |

### Column mapping

Each header cell is lower-cased and trimmed, then matched against the field names and
a list of common spellings: `fname`, `given name`, `surname`, `cell`, `mobile`, `e-mail`,
`latitude`, `lon` and so on. A cell that matches nothing, or a field already claimed by an
earlier column, is ignored.

The suggestion can be overridden on the command line with `--map`:

```text
polistudio import people.csv --map 3=phone --map "Home Phone=ignore"
```

Mapping a field that already has a column moves it to the new column.

Before upload, the mapping must contain `first_name` and `last_name`, each field at most
once. Unless the mode is `replace`, at least one identity field must be selected, and in
`merge` mode the threshold must be between 50 and 100.

### Duplicates

| option                 | values                            | default |
|------------------------|-----------------------------------|---------|
| `--duplicates`         | `merge`, `skip`, `replace`        | `merge` |
| `--identify-by`        | `email`, `phone`, `name_address`  | `email` |
| `--match-threshold`    | 50 to 100                         | 80      |
| `--no-update-existing` |                                   |         |

Matching itself is done by the server.

## Exporting voters

`polistudio export` writes the voter list as CSV, or as JSON with `--format json`. The
server builds the file when it offers an export endpoint; otherwise the file is built
locally. In CSV, tags are joined with `"; "`, booleans are written `Yes`/`No` and dates as
`month/day/year`. In JSON, every voter is an object holding the selected fields with their
raw values.

## Turfs

A turf is a polygon of at least 3 points given as `lat,lng` pairs separated by `;`, or a
JSON file holding a list of `[lat, lng]` pairs. The polygon closes on its own.

A voter is in a turf when its coordinates are inside the polygon. A voter exactly on an
edge or a vertex is inside. Voters without coordinates are never in a turf.

Assigning a turf twice to the same volunteer records two assignments. Deleting a turf
does not delete its assignments or its canvassing results.

Canvassing results are one of `Support`, `No Contact`, `Refused`, `Other`.

## Configuration

The client reads an optional JSON file:

```text
{
  "apiBaseUrl": "https://campaign.example.org/api",
  "token": "...",
  "tokenExpiry": "2026-01-01T00:00:00Z",
  "requestTimeoutSecs": 30,
  "importDefaults": {
    "handleDuplicates": "merge",
    "identifyBy": ["email"],
    "matchThreshold": 80,
    "updateExisting": true
  },
  "exportFields": ["first_name", "last_name", "email"]
}
```

`POLISTUDIO_API_URL` and `POLISTUDIO_TOKEN` override the file, and command line flags
override both.

 */
